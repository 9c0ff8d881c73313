use crate::tcell::RawCell;

/// `PendingWrite` is a speculative value staged by `TCell::set`.
///
/// It lives in the write set until the transaction ends, whether it commits
/// or not.
#[derive(Clone, Copy)]
pub(crate) struct PendingWrite<'a> {
    cell: &'a RawCell,
    bits: u64,
}

impl<'a> PendingWrite<'a> {
    pub(crate) fn new(cell: &'a RawCell, bits: u64) -> PendingWrite<'a> {
        PendingWrite { cell, bits }
    }

    /// The staged value, encoded.
    pub(crate) fn bits(&self) -> u64 {
        self.bits
    }

    /// Overwrite the staged value; a later `set` wins.
    pub(crate) fn replace(&mut self, bits: u64) {
        self.bits = bits;
    }

    /// True if the target has not been committed since `start_epoch`.
    pub(crate) fn can_commit(&self, start_epoch: u64) -> bool {
        self.cell.can_commit(start_epoch)
    }

    /// Publish the staged value into the target cell.
    pub(crate) fn commit(&self, commit_epoch: u64) {
        self.cell.commit(commit_epoch, self.bits);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn last_write_wins() {
        let cell = RawCell::new(0);
        let mut pw = PendingWrite::new(&cell, 1);
        pw.replace(2);
        pw.commit(1);

        assert_eq!(cell.load(1), Ok(2));
    }

    #[test]
    fn can_commit_tracks_foreign_commits() {
        let cell = RawCell::new(0);
        let pw = PendingWrite::new(&cell, 5);
        assert!(pw.can_commit(0));

        cell.commit(3, 9);
        assert!(!pw.can_commit(2));
        assert!(pw.can_commit(3));
    }
}
