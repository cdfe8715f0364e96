mod config;
mod end_to_end;
