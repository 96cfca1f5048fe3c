pub mod attacks;
pub mod generation;
pub mod magic;
pub mod move_list;
