use crate::message::{FetchCancel, NewGroupRequest, SubscribeUpdate, Unsubscribe};
use crate::session::SessionInner;
use crate::track::SubscribeStatus;

use std::sync::Weak;

/// The application's handle to an active subscription.
///
/// Dropping the handle unsubscribes.
pub struct Subscription {
    pub(crate) session: Weak<SessionInner>,
    pub(crate) request_id: u64,
    pub(crate) done: bool,
}

impl Subscription {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn status(&self) -> SubscribeStatus {
        match self.session.upgrade() {
            Some(session) => session.subscription_status(self.request_id),
            None => SubscribeStatus::NotConnected,
        }
    }

    /// Ask the publisher to start a fresh group so a new decoder can join
    /// mid-track.
    pub fn request_new_group(&self) {
        let Some(session) = self.session.upgrade() else {
            return;
        };
        let Some(track_alias) = session.subscription_alias(self.request_id) else {
            log::warn!(
                "new group request before SUBSCRIBE_OK, request_id: {}",
                self.request_id
            );
            return;
        };

        session.set_subscription_status(self.request_id, SubscribeStatus::NewGroupRequested);
        session.send_message(NewGroupRequest {
            request_id: self.request_id,
            track_alias,
        });
    }

    /// Re-scope the subscription.
    pub fn update(&self, update: SubscribeUpdate) {
        let Some(session) = self.session.upgrade() else {
            return;
        };
        session.send_message(SubscribeUpdate {
            subscription_request_id: self.request_id,
            ..update
        });
    }

    /// Stop the subscription; idempotent.
    pub fn unsubscribe(mut self) {
        self.unsubscribe_inner();
    }

    fn unsubscribe_inner(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        if let Some(session) = self.session.upgrade() {
            session.set_subscription_status(self.request_id, SubscribeStatus::SendingUnsubscribe);
            session.send_message(Unsubscribe {
                request_id: self.request_id,
            });
            session.remove_subscription(self.request_id, SubscribeStatus::NotSubscribed);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe_inner();
    }
}

/// The application's handle to an in-flight fetch.
///
/// Dropping the handle before the range completes cancels it.
pub struct FetchRequest {
    pub(crate) session: Weak<SessionInner>,
    pub(crate) request_id: u64,
    pub(crate) done: bool,
}

impl FetchRequest {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn status(&self) -> SubscribeStatus {
        match self.session.upgrade() {
            Some(session) => session.subscription_status(self.request_id),
            None => SubscribeStatus::NotConnected,
        }
    }

    pub fn cancel(mut self) {
        self.cancel_inner();
    }

    fn cancel_inner(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        if let Some(session) = self.session.upgrade() {
            session.send_message(FetchCancel {
                request_id: self.request_id,
            });
            session.remove_subscription(self.request_id, SubscribeStatus::NotSubscribed);
        }
    }
}

impl Drop for FetchRequest {
    fn drop(&mut self) {
        self.cancel_inner();
    }
}
