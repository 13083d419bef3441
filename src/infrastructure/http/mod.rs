//! HTTP access to the Azure DevOps REST API

mod client;

pub use client::{
    decode, encode, DevOpsHttpClient, HttpClientConfig, ReqwestDevOpsClient, ValueList,
    API_VERSION,
};

#[cfg(test)]
pub use client::mock;
