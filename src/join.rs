use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::{Result, bail};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JoinToken(usize);

type Finisher = Box<dyn FnOnce()>;

#[derive(Default)]
struct GroupInner {
    next_token: usize,
    pending: BTreeSet<usize>,
    resolved: BTreeSet<usize>,
    finisher: Option<Finisher>,
    sealed: bool,
    fired: bool,
}

/// Fan-in barrier over independently issued async operations. Tokens are
/// registered up front, resolved in any order, and one finisher fires exactly
/// once after the group is sealed and the last token resolves. Groups are
/// single-use per screen load.
#[derive(Clone, Default)]
pub struct JoinGroup {
    inner: Rc<RefCell<GroupInner>>,
}

impl JoinGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> Result<JoinToken> {
        let mut inner = self.inner.borrow_mut();
        if inner.sealed {
            bail!("join group is already sealed; register before sealing");
        }
        let token = inner.next_token;
        inner.next_token = inner.next_token.saturating_add(1);
        inner.pending.insert(token);
        Ok(JoinToken(token))
    }

    /// Marks a token resolved. Success or failure of the underlying operation
    /// is irrelevant here; the group only counts completions. A second resolve
    /// of the same token is a no-op.
    pub fn resolve(&self, token: JoinToken) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.resolved.contains(&token.0) {
                return Ok(());
            }
            if !inner.pending.remove(&token.0) {
                bail!("resolve of unknown join token {}", token.0);
            }
            inner.resolved.insert(token.0);
        }
        if let Some(finisher) = self.take_ready_finisher() {
            debug!("join group complete; firing finisher");
            finisher();
        }
        Ok(())
    }

    /// Assigns the terminal callback. Fires synchronously on the caller's turn
    /// when every registered token has already resolved.
    pub fn seal(&self, finisher: impl FnOnce() + 'static) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.sealed {
                bail!("join group sealed twice");
            }
            inner.sealed = true;
            inner.finisher = Some(Box::new(finisher));
            debug!(pending = inner.pending.len(), "join group sealed");
        }
        if let Some(finisher) = self.take_ready_finisher() {
            debug!("join group already complete at seal; firing finisher");
            finisher();
        }
        Ok(())
    }

    /// Registers a token and wraps `callback` so the token resolves right
    /// after the callback runs, whatever the outcome was.
    pub fn wrap<T>(&self, callback: impl FnOnce(T) + 'static) -> Result<Box<dyn FnOnce(T)>> {
        let token = self.register()?;
        let group = self.clone();
        Ok(Box::new(move |value: T| {
            callback(value);
            group.resolve(token).ok();
        }))
    }

    pub fn pending_len(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    pub fn is_fired(&self) -> bool {
        self.inner.borrow().fired
    }

    // The finisher must be invoked with no borrow held; it may clone handles
    // to this group.
    fn take_ready_finisher(&self) -> Option<Finisher> {
        let mut inner = self.inner.borrow_mut();
        if inner.sealed && !inner.fired && inner.pending.is_empty() {
            inner.fired = true;
            return inner.finisher.take();
        }
        None
    }
}
