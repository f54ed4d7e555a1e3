pub mod format;
pub mod hijri;
pub mod maps;
pub mod time;
