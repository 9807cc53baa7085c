pub mod layout;
pub mod messages;
pub mod models;
pub mod navigation;
pub mod photos;
pub mod schedule;
pub mod settings_form;
pub mod theme;
pub mod view;
