pub mod console;
pub mod event_loop;
