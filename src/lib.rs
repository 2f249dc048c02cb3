//! Real-time control core for a two-wheeled line following robot with two reflectance sensors.
//!
//! A single periodic timer tick drives everything. The [`scheduler`] fans it out into
//! sub-tasks: display refresh, button polling, [software PWM](pwm), [analog scans](sampler)
//! and the [line-follow controller](controller). A second interrupt stores each completed scan.
//! All of that state lives in one owned [`RobotContext`](context::RobotContext), reached through
//! the non-reentrant [`Shared`](interrupt::Shared) guard.
//!
//! ## Operation
//!
//! After reset the robot waits for calibration. Using the [`menu`], the operator confirms a
//! background snapshot, then a line snapshot; the midpoint becomes the classification
//! threshold and tracking starts. Tracking before calibration runs, but against a zero
//! threshold, so its decisions are meaningless.
//!
//! ## Crate features
//!
//! - `rp2040`: Board support in [`board`] and the firmware binary. Implies `defmt`.
//! - `defmt`: Logs through [defmt](https://docs.rs/defmt) instead of the [`log`] facade.
//! - `trace_samples`: Logs every completed conversion group. See
//!   [`sampler::Sampler::on_conversion_complete`].
//! - `trace_control`: Logs every control evaluation. Very noisy! See
//!   [`controller::Controller::evaluate`].
//!
//! ## Demo
//!
//! Driving the core with host-side collaborators:
//!
//! ```
//! use linetracer::{
//!     classifier::SensorReadings,
//!     config::ControlConfig,
//!     controller::{Controller, Mode},
//! };
//!
//! let mut controller = Controller::new(ControlConfig::default());
//! controller.evaluate(SensorReadings::new(200, 200));
//! controller.confirm();
//! controller.evaluate(SensorReadings::new(40, 40));
//! controller.confirm();
//! assert_eq!(controller.mode(), Mode::Tracking);
//!
//! let commands = controller.evaluate(SensorReadings::new(30, 210));
//! assert_eq!(commands.speeds(), (247, 255));
//! ```

// Copyright 2024 Line Tracer team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), feature(doc_auto_cfg), feature(doc_cfg_hide))]

#[macro_use]
mod fmt;

#[cfg(feature = "rp2040")]
pub mod board;
pub mod buffer;
pub mod classifier;
pub mod config;
pub mod context;
pub mod controller;
pub mod display;
pub mod error;
pub mod input;
pub mod interrupt;
pub mod menu;
pub mod motor;
pub mod pwm;
pub mod sampler;
pub mod scheduler;

pub use error::Error;
