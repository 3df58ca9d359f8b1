mod common;
mod concurrency;
mod lifecycle;
