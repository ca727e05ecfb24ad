// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution contexts and the cooperative timer scheduler

mod clock;
mod context;
mod timers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{Context, ContextBuilder};
pub use timers::{TimerId, TimerPoll, TimerScheduler, DEFAULT_TIMER_CAPACITY};
