//! World entities: cities, nations, generals and the road graph

pub mod city;
pub mod general;
pub mod graph;
pub mod nation;

pub use city::{City, ConflictScores, Track};
pub use general::{General, GeneralDelta};
pub use graph::{CityGraph, WorldMap};
pub use nation::{Nation, NationDelta};
