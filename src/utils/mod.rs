pub mod calendar;
pub mod db_utils;
pub mod key_locks;
