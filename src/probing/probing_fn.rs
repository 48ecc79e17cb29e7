/// A probe sequence over a directory of fixed size.
///
/// `probe(origin, 0)` must be `origin`, and every returned index must be below
/// the directory size. Sequences are expected to return to `origin` eventually;
/// tables treat that as "every reachable bucket is full".
pub trait ProbingFn: Send + Sync {
    fn new(directory_size: usize) -> Self
    where
        Self: Sized;

    fn probe(&self, origin: usize, step: usize) -> usize;

    fn name() -> &'static str
    where
        Self: Sized;
}

/// `origin + step`, wrapping at the end of the directory.
#[derive(Clone, Copy, Debug)]
pub struct LinearProbing {
    directory_size: usize,
}

impl ProbingFn for LinearProbing {
    fn new(directory_size: usize) -> Self {
        Self { directory_size }
    }

    #[inline]
    fn probe(&self, origin: usize, step: usize) -> usize {
        let next = origin + step % self.directory_size;
        if next >= self.directory_size {
            next - self.directory_size
        } else {
            next
        }
    }

    fn name() -> &'static str {
        "linear"
    }
}

/// `origin + step²`, wrapping at the end of the directory.
#[derive(Clone, Copy, Debug)]
pub struct QuadraticProbing {
    directory_size: u128,
}

impl ProbingFn for QuadraticProbing {
    fn new(directory_size: usize) -> Self {
        Self {
            directory_size: directory_size as u128,
        }
    }

    #[inline]
    fn probe(&self, origin: usize, step: usize) -> usize {
        let step = step as u128;
        ((origin as u128 + step * step) % self.directory_size) as usize
    }

    fn name() -> &'static str {
        "quadratic"
    }
}

/// Walks a probe sequence from its origin, yielding `(step, index)` pairs
/// until the sequence comes back to the origin.
pub(crate) struct ProbeSeq<'a, F> {
    probing: &'a F,
    origin: usize,
    step: usize,
    next: Option<usize>,
}

impl<'a, F: ProbingFn> ProbeSeq<'a, F> {
    pub(crate) fn new(probing: &'a F, origin: usize) -> Self {
        Self {
            probing,
            origin,
            step: 0,
            next: Some(origin),
        }
    }
}

impl<F: ProbingFn> Iterator for ProbeSeq<'_, F> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let step = self.step;

        self.step += 1;
        let following = self.probing.probe(self.origin, self.step);
        self.next = (following != self.origin).then_some(following);

        Some((step, index))
    }
}
