pub mod capabilities;
pub mod check;
pub mod input;
pub mod load;

pub mod util;
