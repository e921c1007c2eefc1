//! Types generated from `proto/` by the build script.

pub mod common {
    include!(concat!(env!("OUT_DIR"), "/common.rs"));
}

pub mod geometry {
    include!(concat!(env!("OUT_DIR"), "/geometry.rs"));
}

pub mod scalars {
    include!(concat!(env!("OUT_DIR"), "/scalars.rs"));
}
