pub mod cursor;
