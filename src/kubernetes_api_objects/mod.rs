// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod label_selector;
pub mod pod;
pub mod resource;
pub mod topology_spread_constraint;
