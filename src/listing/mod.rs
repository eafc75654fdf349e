pub mod extract;
pub mod pager;
