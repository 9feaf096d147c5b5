pub mod check;
pub mod evolve;
pub mod parse;
