// SPDX-License-Identifier: Apache-2.0

//! Analog sampling: scan triggering, the conversion buffer and smoothed reads.

use crate::{
    buffer::Ring,
    config::{ADC_BUFFER_DEPTH, CHANNEL_COUNT, SMOOTHING_WINDOW},
    error::Error,
};

/// One raw sample per channel, from a single group conversion
pub type Frame = [u8; CHANNEL_COUNT];

/// Analog converter that scans a fixed group of [`CHANNEL_COUNT`] channels
pub trait AdcGroup {
    /// Begin converting the group. Completion is signalled by the conversion-complete interrupt.
    fn start_conversion(&mut self);
    /// Stop the converter and clear its "conversion done" condition
    fn stop_and_clear_done(&mut self);
    /// Raw results of the last group conversion, one per channel
    fn read_results(&mut self) -> Frame;
}

/// Converter that samples its enabled channels round-robin, in increasing channel order, into a
/// sample FIFO.
///
/// A free-running converter keeps moving to the next channel after every conversion, and a
/// conversion already in flight when it is paused still lands in the FIFO afterwards. Frames are
/// only aligned to channels if every scan starts from a known channel on an empty FIFO.
pub trait RoundRobinFifo {
    /// Select the first channel and start free-running conversions into an empty FIFO
    fn restart(&mut self);
    /// Stop starting new conversions. Samples already queued stay readable.
    fn pause(&mut self);
    /// Oldest queued sample, if any
    fn pop(&mut self) -> Option<u8>;
    /// Wait out the conversion in flight, then discard everything still queued
    fn halt(&mut self);
}

/// [`AdcGroup`] over a [`RoundRobinFifo`].
///
/// Every scan restarts on the first channel and every read ends by halting the converter, so
/// slot `n` of a frame is always channel `n`, however late the conversion-complete interrupt is
/// serviced.
pub struct RoundRobinGroup<F> {
    fifo: F,
}

impl<F: RoundRobinFifo> RoundRobinGroup<F> {
    /// Wrap an idle converter
    pub fn new(fifo: F) -> Self {
        Self { fifo }
    }
}

impl<F: RoundRobinFifo> AdcGroup for RoundRobinGroup<F> {
    fn start_conversion(&mut self) {
        self.fifo.restart();
    }

    fn stop_and_clear_done(&mut self) {
        self.fifo.pause();
    }

    fn read_results(&mut self) -> Frame {
        let mut frame = [0; CHANNEL_COUNT];
        for (channel, sample) in frame.iter_mut().enumerate() {
            match self.fifo.pop() {
                Some(value) => *sample = value,
                None => {
                    warn!("sample FIFO ran dry at channel {}", channel);
                    break;
                }
            }
        }
        // Extra conversions from a late interrupt, and the one in flight, are stale
        self.fifo.halt();
        frame
    }
}

/// Drives group conversions and keeps the most recent [`ADC_BUFFER_DEPTH`] frames.
///
/// The conversion buffer is written only by [`on_conversion_complete`](Sampler::on_conversion_complete)
/// and read only by [`read_smoothed`](Sampler::read_smoothed).
pub struct Sampler<A: AdcGroup> {
    adc: A,
    /// All channels share one write pointer
    buffer: Ring<Frame, ADC_BUFFER_DEPTH>,
    /// A conversion was started and has not completed yet
    pending: bool,
}

impl<A: AdcGroup> Sampler<A> {
    /// Wrap a converter. The buffer starts zeroed with the write pointer at slot 0.
    pub fn new(adc: A) -> Self {
        Self {
            adc,
            buffer: Ring::new([0; CHANNEL_COUNT]),
            pending: false,
        }
    }

    /// Start a group conversion unless one is already pending
    pub fn trigger_scan(&mut self) {
        if self.pending {
            trace!("scan already pending, trigger ignored");
            return;
        }
        self.adc.start_conversion();
        self.pending = true;
    }

    /// Handle the conversion-complete interrupt: clear the done condition, advance the write
    /// pointer and store the fresh frame there.
    pub fn on_conversion_complete(&mut self) {
        self.adc.stop_and_clear_done();
        let frame = self.adc.read_results();
        self.buffer.push(frame);
        self.pending = false;

        #[cfg(feature = "trace_samples")]
        trace!(
            "conversion stored at slot {}: {:?}",
            self.buffer.head().get(),
            frame
        );
    }

    /// Mean of the [`SMOOTHING_WINDOW`] most recent samples of `channel`, truncated.
    ///
    /// Recomputed on every call. Channels outside `0..CHANNEL_COUNT` yield
    /// [`Error::InvalidChannel`].
    pub fn read_smoothed(&self, channel: usize) -> Result<u8, Error> {
        if channel >= CHANNEL_COUNT {
            return Err(Error::InvalidChannel(channel));
        }
        let sum: u16 = self
            .buffer
            .recent(SMOOTHING_WINDOW)
            .map(|frame| u16::from(frame[channel]))
            .sum();
        // The mean of u8 samples always fits back into a u8
        Ok((sum / SMOOTHING_WINDOW as u16) as u8)
    }

    /// A conversion has been started and not yet completed
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Slot of the most recently stored frame
    pub fn write_pointer(&self) -> usize {
        self.buffer.head().get()
    }
}

#[cfg(test)]
pub(crate) mod mocks {
    use super::*;
    use std::{cell::RefCell, collections::VecDeque, rc::Rc};

    pub struct MockAdc {
        pub starts: usize,
        pub clears: usize,
        pub queued: VecDeque<Frame>,
    }

    #[derive(Clone)]
    pub struct MockAdcHandle(pub Rc<RefCell<MockAdc>>);

    impl MockAdcHandle {
        pub fn new() -> Self {
            Self(Rc::new(RefCell::new(MockAdc {
                starts: 0,
                clears: 0,
                queued: VecDeque::new(),
            })))
        }

        pub fn queue(&self, frame: Frame) {
            self.0.borrow_mut().queued.push_back(frame);
        }
    }

    impl AdcGroup for MockAdcHandle {
        fn start_conversion(&mut self) {
            self.0.borrow_mut().starts += 1;
        }

        fn stop_and_clear_done(&mut self) {
            self.0.borrow_mut().clears += 1;
        }

        fn read_results(&mut self) -> Frame {
            self.0.borrow_mut().queued.pop_front().unwrap_or_default()
        }
    }

    /// Hardware model of a free-running round-robin converter with a 4-entry FIFO
    pub struct MockFifo {
        /// Value each channel currently reads
        pub inputs: Frame,
        pub channel: usize,
        pub running: bool,
        /// A conversion was started before the last pause and has not landed yet
        pub in_flight: bool,
        pub queue: VecDeque<u8>,
        pub restarts: usize,
    }

    #[derive(Clone)]
    pub struct MockFifoHandle(pub Rc<RefCell<MockFifo>>);

    impl MockFifoHandle {
        pub fn new(inputs: Frame) -> Self {
            Self(Rc::new(RefCell::new(MockFifo {
                inputs,
                channel: 0,
                running: false,
                in_flight: false,
                queue: VecDeque::new(),
                restarts: 0,
            })))
        }

        /// Let the converter finish `count` conversions. Full FIFO drops them.
        pub fn convert(&self, count: usize) {
            let mut fifo = self.0.borrow_mut();
            for _ in 0..count {
                if !fifo.running {
                    break;
                }
                let sample = fifo.inputs[fifo.channel];
                if fifo.queue.len() < 4 {
                    fifo.queue.push_back(sample);
                }
                fifo.channel = (fifo.channel + 1) % CHANNEL_COUNT;
            }
        }

        /// Land the conversion that was in flight at the last pause
        pub fn land_in_flight(&self) {
            let mut fifo = self.0.borrow_mut();
            if fifo.in_flight {
                fifo.in_flight = false;
                let sample = fifo.inputs[fifo.channel];
                fifo.queue.push_back(sample);
                fifo.channel = (fifo.channel + 1) % CHANNEL_COUNT;
            }
        }
    }

    impl RoundRobinFifo for MockFifoHandle {
        fn restart(&mut self) {
            let mut fifo = self.0.borrow_mut();
            fifo.restarts += 1;
            fifo.channel = 0;
            fifo.queue.clear();
            fifo.running = true;
        }

        fn pause(&mut self) {
            let mut fifo = self.0.borrow_mut();
            fifo.running = false;
            fifo.in_flight = true;
        }

        fn pop(&mut self) -> Option<u8> {
            self.0.borrow_mut().queue.pop_front()
        }

        fn halt(&mut self) {
            self.land_in_flight();
            self.0.borrow_mut().queue.clear();
        }
    }
}
