use crate::structs::*;

/// Pacing delays between packets of the same drain
pub mod pacing;

/// The transport-layer buffer: an ordered sequence of tagged bytes.
///
/// Bytes are appended at the tail and removed from the tail. Adjacent bytes with the same tag are
/// stored as a single run, so a run is always maximal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportBuffer {
    runs: Vec<TaggedRun>,
    len: usize,
}

impl TransportBuffer {
    pub fn new() -> Self {
        TransportBuffer::default()
    }

    /// Append a run at the tail. It is merged with the last run if they share the same tag.
    pub fn append(&mut self, run: TaggedRun) {
        if run.len == 0 {
            return;
        }
        self.len += run.len;
        match self.runs.last_mut() {
            Some(last) if last.parameter == run.parameter => last.len += run.len,
            _ => self.runs.push(run),
        }
    }

    /// Number of bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn runs(&self) -> &[TaggedRun] {
        &self.runs
    }

    /// The raw content of the buffer, from front to tail
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len);
        for run in self.runs.iter() {
            run.write_bytes(&mut bytes);
        }
        bytes
    }

    /// Remove the last run
    pub fn pop_run(&mut self) -> Option<TaggedRun> {
        let run = self.runs.pop()?;
        self.len -= run.len;
        Some(run)
    }

    /// Remove the last `count` bytes, splitting a run if needed.
    ///
    /// Panics if the buffer holds less than `count` bytes: the packetizer always computes what
    /// it extracts, so an underflow is a bug.
    pub fn split_tail(&mut self, count: usize) -> Segment {
        assert!(
            count <= self.len,
            "Transport buffer underflow: {count} bytes requested, {} available",
            self.len
        );
        let mut remaining = count;
        let mut runs = vec![];
        while remaining > 0 {
            let last = self.runs.last_mut().expect("length accounting is broken");
            if last.len <= remaining {
                remaining -= last.len;
                runs.push(*last);
                self.runs.pop();
            } else {
                last.len -= remaining;
                runs.push(TaggedRun::new(last.parameter, remaining));
                remaining = 0;
            }
        }
        self.len -= count;
        runs.reverse();
        Segment { runs }
    }
}

/// Segments the transport buffer into packet payloads.
///
/// In downlink, each run read from the tail is one packet, so that every parameter is sent in its
/// own packet. In uplink, the buffer is cut from the tail into `max_len`-byte fragments, the last
/// (front-most) one holding the remainder.
#[derive(Debug, Clone, Copy)]
pub struct Packetizer {
    mode: Mode,
    max_len: usize,
}

impl Packetizer {
    /// `max_len` must be positive
    pub fn new(mode: Mode, max_len: usize) -> Self {
        Packetizer { mode, max_len }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Start a drain event. Every segment yielded by the iterator has already been removed from
    /// the buffer; once the iterator is exhausted, the buffer is empty.
    pub fn drain<'a>(&self, buffer: &'a mut TransportBuffer) -> Drain<'a> {
        let chunks = match self.mode {
            Mode::Downlink => 0,
            Mode::Uplink => buffer.len().div_ceil(self.max_len),
        };
        Drain {
            buffer,
            mode: self.mode,
            max_len: self.max_len,
            remaining_chunks: chunks,
        }
    }
}

/// Iterator over the segments of one drain event
#[derive(Debug)]
pub struct Drain<'a> {
    buffer: &'a mut TransportBuffer,
    mode: Mode,
    max_len: usize,
    remaining_chunks: usize,
}

impl Iterator for Drain<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        match self.mode {
            Mode::Downlink => {
                // runs are maximal: the scan from the tail stops at the first tag change, or
                // takes the whole buffer when it is homogeneous
                let run = self.buffer.pop_run()?;
                Some(Segment { runs: vec![run] })
            }
            Mode::Uplink => {
                if self.remaining_chunks == 0 {
                    return None;
                }
                self.remaining_chunks -= 1;
                let count = if self.remaining_chunks == 0 {
                    self.buffer.len()
                } else {
                    self.max_len
                };
                Some(self.buffer.split_tail(count))
            }
        }
    }
}
