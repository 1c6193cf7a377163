//! Bivariate choropleth of European indicators: colour model, data access,
//! map and legend builders, plus the terminal front end.

pub mod app;
pub mod bivariate;
pub mod braille;
pub mod color;
pub mod data;
pub mod geo;
pub mod legend;
pub mod map;
pub mod normalize;
pub mod ui;
pub mod variables;
