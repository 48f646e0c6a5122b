pub mod context_menu;
pub mod logs;
pub mod settings;
