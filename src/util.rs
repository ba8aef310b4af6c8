mod counting_writer;
mod offset_vec;

pub use counting_writer::*;
pub use offset_vec::*;
