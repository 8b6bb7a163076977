#![allow(dead_code)]

pub mod penguin_env;
pub mod penguins;
