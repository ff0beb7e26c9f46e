crate::bindings!(MultiAuction);

pub use alloy::providers::DynProvider as Provider;

/// Extension trait to attach some useful functions to the contract instance.
pub trait InstanceExt: Sized {
    /// Creates a contract instance at the configured address after making
    /// sure that there actually is code deployed there.
    fn deployed_at(
        address: alloy::primitives::Address,
        provider: &Provider,
    ) -> impl std::future::Future<Output = anyhow::Result<Self>> + Send;
}

#[macro_export]
macro_rules! bindings {
    ($contract:ident) => {
        paste::paste! {
            // Generate the main bindings in a private module. That allows
            // us to re-export all items in our own module while also adding
            // some items ourselves.
            #[allow(non_snake_case)]
            mod [<$contract Private>] {
                alloy::sol!(
                    #[allow(missing_docs)]
                    #[sol(rpc)]
                    $contract,
                    concat!("./artifacts/", stringify!($contract), ".json"),
                );
            }

            #[allow(non_snake_case)]
            pub mod $contract {
                use {
                    alloy::{
                        primitives::Address,
                        providers::{DynProvider, Provider},
                    },
                    anyhow::{Context, Result, ensure},
                };

                pub use super::[<$contract Private>]::*;
                pub type Instance = $contract::[<$contract Instance>]<DynProvider>;

                impl $crate::alloy::InstanceExt for Instance {
                    fn deployed_at(
                        address: Address,
                        provider: &DynProvider,
                    ) -> impl Future<Output = Result<Self>> + Send {
                        async move {
                            let code = provider
                                .get_code_at(address)
                                .await
                                .with_context(|| format!("could not fetch code at {address:?}"))?;
                            ensure!(
                                !code.is_empty(),
                                "no {} contract deployed at {address:?}",
                                stringify!($contract),
                            );
                            Ok(Instance::new(address, provider.clone()))
                        }
                    }
                }
            }
        }
    };
}
