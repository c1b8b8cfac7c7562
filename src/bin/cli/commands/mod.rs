pub mod classify;
pub mod deck;
pub mod practice;
pub mod stats;
