mod config_test;
mod feed_test;
