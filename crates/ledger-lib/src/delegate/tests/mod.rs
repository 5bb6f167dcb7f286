mod cost;
mod execution;
mod merge;
mod scheduler;
