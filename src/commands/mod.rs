pub mod brief;
