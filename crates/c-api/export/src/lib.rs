pub use hostbridge_c_api::*;
