#![allow(dead_code)]

pub mod recordings;
pub mod rrational_env;
