mod fuse;
mod java;
mod properties;
