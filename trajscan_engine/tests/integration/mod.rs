mod abort;
mod axes_props;
mod common;
mod config_load;
mod faults;
mod host_feed;
mod streaming;
