//! Small pure helpers shared by screens and the terminal driver.

pub mod share_link;
pub mod timer;
