// hlsc — HLS C++ emitter
//
// Library root. The emitter renders a resolved program model (`ir`) as
// Vivado HLS C++; `pipeline` wraps it for the driver.

pub mod affine;
pub mod builder;
pub mod diag;
pub mod emit;
pub mod error;
pub mod id;
mod ip;
pub mod ir;
pub mod names;
pub mod pipeline;
mod pragma;
mod stmt;
