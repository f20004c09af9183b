#![allow(dead_code)]

pub mod architecture;
pub mod journal;
pub mod temp_db;
