pub mod fundamentals;
pub mod models;
pub mod qualitative;
pub mod verdict;
