pub mod ancestry;
pub mod config;
pub mod join;
pub mod render;
pub mod requests;
pub mod rows;
pub mod schedule;
pub mod screen;
pub mod surface;
pub mod virtual_list;
