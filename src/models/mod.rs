pub mod settings;
pub mod window_record;

pub use settings::Settings;
pub use window_record::WindowRecord;
