pub mod app_log;
pub mod geometry;
pub mod geometry_worker;
pub mod persistence;
pub mod selection_menu;
pub mod timers;
pub mod window_events;
pub mod window_geometry;
pub mod window_host;
