pub mod behavior;
pub mod config;
pub mod disease;
pub mod entity;
pub mod event;
pub mod grid;
pub mod kind;
pub mod population;
pub mod weather;
pub mod world;
