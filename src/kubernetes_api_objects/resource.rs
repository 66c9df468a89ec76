// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT

/// ResourceWrapper is implemented by every crate-owned wrapper around a k8s-openapi type.
/// The wrappers only expose what the audit reads, and from_kube/into_kube convert at the
/// boundary with kube-rs.
pub trait ResourceWrapper<T>: Sized {
    fn from_kube(inner: T) -> Self;

    fn into_kube(self) -> T;

    fn as_kube_ref(&self) -> &T;
}

#[macro_export]
macro_rules! implement_resource_wrapper_trait {
    ($t:ty, $it:ty) => {
        impl $crate::kubernetes_api_objects::resource::ResourceWrapper<$it> for $t {
            fn from_kube(inner: $it) -> $t {
                Self { inner: inner }
            }

            fn into_kube(self) -> $it {
                self.inner
            }

            fn as_kube_ref(&self) -> &$it {
                &self.inner
            }
        }
    };
}
