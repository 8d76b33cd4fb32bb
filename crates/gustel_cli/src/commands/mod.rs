pub mod db;
pub mod sounds;
