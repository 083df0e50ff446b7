//! `AsyncChannel` (§4.8 C9): a bounded, FIFO-fair rendezvous channel of
//! `Value`s. Suspension is real OS-thread blocking on a condvar rather than
//! a hand-rolled generator — §5 permits this explicitly ("implementations
//! MAY internally use OS threads, but the observable semantics MUST be the
//! same as single-threaded interleaving").
//!
//! Fairness is ticket-based: a waiter takes a number when it starts waiting
//! and only proceeds once it is its turn, so repeated `notify_one` wakeups
//! under contention can never let a later arrival cut ahead of an earlier
//! one (parking_lot's condvar itself makes no such FIFO guarantee).

use cairs_ir::{ErrorCode, Value};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Advisory only (§4.8): the type system's view of a channel's fan-in/out
/// shape. `broadcast` is the one variant with different `send` semantics —
/// every currently registered receiver gets a copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelType {
    Spsc,
    Mpsc,
    Mpmc,
    Broadcast,
}

impl ChannelType {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "spsc" => Some(ChannelType::Spsc),
            "mpsc" => Some(ChannelType::Mpsc),
            "mpmc" => Some(ChannelType::Mpmc),
            "broadcast" => Some(ChannelType::Broadcast),
            _ => None,
        }
    }
}

struct Inner {
    buf: VecDeque<Value>,
    capacity: usize,
    closed: bool,
    waiting_receivers: u64,
    send_queue: VecDeque<u64>,
    recv_queue: VecDeque<u64>,
    next_ticket: u64,
    /// `Broadcast` only: one inbox per receiver currently parked in `recv`,
    /// keyed by the ticket it registered under. A `send` fans a copy of the
    /// value out to every inbox in this list; a receiver that registers
    /// after a `send` has already happened never sees it, matching
    /// "every *currently registered* receiver" rather than implying replay.
    broadcast_inboxes: Vec<(u64, VecDeque<Value>)>,
}

pub struct AsyncChannel {
    channel_type: ChannelType,
    inner: Mutex<Inner>,
    activity: Condvar,
}

fn closed_error() -> Value {
    Value::error_with(ErrorCode::DomainError, "channel is closed")
}

impl AsyncChannel {
    pub fn new(channel_type: ChannelType, capacity: i64) -> Result<Self, Value> {
        if capacity < 0 {
            return Err(Value::error_with(ErrorCode::DomainError, "channel capacity must be non-negative"));
        }
        Ok(AsyncChannel {
            channel_type,
            inner: Mutex::new(Inner {
                buf: VecDeque::new(),
                capacity: capacity as usize,
                closed: false,
                waiting_receivers: 0,
                send_queue: VecDeque::new(),
                recv_queue: VecDeque::new(),
                next_ticket: 0,
                broadcast_inboxes: Vec::new(),
            }),
            activity: Condvar::new(),
        })
    }

    #[must_use]
    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.lock().buf.len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        drop(inner);
        self.activity.notify_all();
    }

    /// Blocking send: direct hand-off to a parked receiver bypasses the
    /// capacity check; otherwise buffers while under capacity; otherwise
    /// suspends until room opens up (§4.8). `Broadcast` channels fan out
    /// instead and never block (there is no shared buffer to fill).
    pub fn send(&self, value: Value) -> Value {
        if self.channel_type == ChannelType::Broadcast {
            return self.broadcast_send(value);
        }
        let mut inner = self.inner.lock();
        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        inner.send_queue.push_back(ticket);
        loop {
            if inner.closed {
                inner.send_queue.retain(|t| *t != ticket);
                drop(inner);
                self.activity.notify_all();
                return closed_error();
            }
            let my_turn = inner.send_queue.front() == Some(&ticket);
            let room = inner.waiting_receivers > 0 || inner.buf.len() < inner.capacity;
            if my_turn && room {
                inner.send_queue.pop_front();
                inner.buf.push_back(value);
                drop(inner);
                self.activity.notify_all();
                return Value::Void;
            }
            self.activity.wait(&mut inner);
        }
    }

    /// Non-blocking send (§4.8 `trySend`): fails rather than suspending when
    /// there is no room and no parked receiver. `Broadcast` always succeeds
    /// immediately, same as the blocking form.
    pub fn try_send(&self, value: Value) -> Value {
        if self.channel_type == ChannelType::Broadcast {
            return self.broadcast_send(value);
        }
        let mut inner = self.inner.lock();
        if inner.closed {
            return closed_error();
        }
        let room = inner.waiting_receivers > 0 || inner.buf.len() < inner.capacity;
        if !room || !inner.send_queue.is_empty() {
            return Value::error_with(ErrorCode::DomainError, "channel send would block");
        }
        inner.buf.push_back(value);
        drop(inner);
        self.activity.notify_all();
        Value::Void
    }

    /// `Broadcast` send: copies `value` into every inbox currently parked in
    /// [`Self::recv`]. A receiver that has not registered yet (has not
    /// called `recv`) simply misses it — there is no buffering for absent
    /// subscribers.
    fn broadcast_send(&self, value: Value) -> Value {
        let mut inner = self.inner.lock();
        if inner.closed {
            return closed_error();
        }
        for (_, inbox) in &mut inner.broadcast_inboxes {
            inbox.push_back(value.clone());
        }
        drop(inner);
        self.activity.notify_all();
        Value::Void
    }

    /// `Broadcast` recv: registers a fresh inbox for the duration of this
    /// call, blocks until a `send` fills it or the channel closes, then
    /// deregisters. Each call is its own receiver identity — there is no
    /// persistent subscription across calls.
    fn broadcast_recv(&self) -> Value {
        let mut inner = self.inner.lock();
        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        inner.broadcast_inboxes.push((ticket, VecDeque::new()));
        loop {
            if let Some((_, inbox)) = inner.broadcast_inboxes.iter_mut().find(|(t, _)| *t == ticket) {
                if let Some(value) = inbox.pop_front() {
                    inner.broadcast_inboxes.retain(|(t, _)| *t != ticket);
                    drop(inner);
                    self.activity.notify_all();
                    return value;
                }
            }
            if inner.closed {
                inner.broadcast_inboxes.retain(|(t, _)| *t != ticket);
                drop(inner);
                self.activity.notify_all();
                return closed_error();
            }
            self.activity.wait(&mut inner);
        }
    }

    pub fn recv(&self) -> Value {
        if self.channel_type == ChannelType::Broadcast {
            return self.broadcast_recv();
        }
        let mut inner = self.inner.lock();
        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        inner.recv_queue.push_back(ticket);
        inner.waiting_receivers += 1;
        loop {
            let my_turn = inner.recv_queue.front() == Some(&ticket);
            if my_turn && !inner.buf.is_empty() {
                inner.recv_queue.pop_front();
                inner.waiting_receivers -= 1;
                let value = inner.buf.pop_front().expect("just checked non-empty");
                drop(inner);
                self.activity.notify_all();
                return value;
            }
            if inner.closed && inner.buf.is_empty() {
                inner.recv_queue.retain(|t| *t != ticket);
                inner.waiting_receivers -= 1;
                drop(inner);
                self.activity.notify_all();
                return closed_error();
            }
            self.activity.wait(&mut inner);
        }
    }

    /// `Broadcast` has no non-blocking form: a receiver only exists once it
    /// is parked in [`Self::recv`], so a one-shot poll has no registered
    /// inbox to check and can never succeed.
    pub fn try_recv(&self) -> Value {
        if self.channel_type == ChannelType::Broadcast {
            let inner = self.inner.lock();
            return if inner.closed { closed_error() } else { Value::error_with(ErrorCode::DomainError, "channel recv would block") };
        }
        let mut inner = self.inner.lock();
        if !inner.buf.is_empty() && inner.recv_queue.is_empty() {
            let value = inner.buf.pop_front().expect("just checked non-empty");
            drop(inner);
            self.activity.notify_all();
            return value;
        }
        if inner.closed {
            return closed_error();
        }
        Value::error_with(ErrorCode::DomainError, "channel recv would block")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn negative_capacity_is_rejected() {
        assert!(AsyncChannel::new(ChannelType::Spsc, -1).is_err());
    }

    #[test]
    fn buffered_send_then_recv_round_trips() {
        let ch = AsyncChannel::new(ChannelType::Spsc, 2).unwrap();
        assert_eq!(ch.send(Value::Int(1)), Value::Void);
        assert_eq!(ch.size(), 1);
        assert_eq!(ch.recv(), Value::Int(1));
    }

    #[test]
    fn try_send_fails_when_full() {
        let ch = AsyncChannel::new(ChannelType::Spsc, 1).unwrap();
        assert_eq!(ch.try_send(Value::Int(1)), Value::Void);
        assert!(ch.try_send(Value::Int(2)).is_error());
    }

    #[test]
    fn try_recv_fails_when_empty() {
        let ch = AsyncChannel::new(ChannelType::Spsc, 1).unwrap();
        assert!(ch.try_recv().is_error());
    }

    #[test]
    fn recv_after_close_with_empty_buffer_is_an_error() {
        let ch = AsyncChannel::new(ChannelType::Spsc, 1).unwrap();
        ch.close();
        assert!(ch.recv().is_error());
    }

    #[test]
    fn buffered_values_remain_receivable_after_close() {
        let ch = AsyncChannel::new(ChannelType::Spsc, 2).unwrap();
        ch.send(Value::Int(9));
        ch.close();
        assert_eq!(ch.recv(), Value::Int(9));
        assert!(ch.recv().is_error());
    }

    #[test]
    fn a_blocked_sender_is_released_once_a_receiver_drains_the_channel() {
        let ch = Arc::new(AsyncChannel::new(ChannelType::Spsc, 1).unwrap());
        assert_eq!(ch.send(Value::Int(1)), Value::Void);
        let ch2 = ch.clone();
        let handle = thread::spawn(move || ch2.send(Value::Int(2)));
        // give the blocked sender a moment to actually park on the condvar
        thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(ch.recv(), Value::Int(1));
        assert_eq!(handle.join().unwrap(), Value::Void);
        assert_eq!(ch.recv(), Value::Int(2));
    }

    #[test]
    fn broadcast_delivers_a_copy_to_every_registered_receiver() {
        let ch = Arc::new(AsyncChannel::new(ChannelType::Broadcast, 0).unwrap());
        let c1 = ch.clone();
        let c2 = ch.clone();
        let r1 = thread::spawn(move || c1.recv());
        let r2 = thread::spawn(move || c2.recv());
        thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(ch.send(Value::Int(7)), Value::Void);
        assert_eq!(r1.join().unwrap(), Value::Int(7));
        assert_eq!(r2.join().unwrap(), Value::Int(7));
    }

    #[test]
    fn broadcast_send_with_no_registered_receivers_drops_the_value() {
        let ch = AsyncChannel::new(ChannelType::Broadcast, 0).unwrap();
        assert_eq!(ch.send(Value::Int(1)), Value::Void);
        assert_eq!(ch.size(), 0);
    }

    #[test]
    fn broadcast_try_recv_never_succeeds() {
        let ch = AsyncChannel::new(ChannelType::Broadcast, 0).unwrap();
        assert!(ch.try_recv().is_error());
    }

    #[test]
    fn broadcast_recv_after_close_is_an_error() {
        let ch = AsyncChannel::new(ChannelType::Broadcast, 0).unwrap();
        ch.close();
        assert!(ch.recv().is_error());
    }
}
