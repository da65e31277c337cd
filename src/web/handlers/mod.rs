pub mod guidelines;
pub mod moderate;
