pub mod repartition;
pub mod sort;
