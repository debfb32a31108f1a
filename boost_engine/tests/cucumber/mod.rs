mod boost_world;
mod setups;
mod steps;

pub use boost_world::BoostWorld;
