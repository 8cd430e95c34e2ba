use crate::config::Delimiter;
use std::slice::Iter;

/// One annotation cell, split into phrases and flattened into a single token buffer. The
/// `indices` hold the boundaries of the phrases: phrase `i` spans
/// `tokens[indices[i]..indices[i + 1]]`. Built for reducing allocations, as every row allocates
/// two of them.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Clone, Default)]
pub(crate) struct Segments<T> {
    pub(crate) tokens: Box<[T]>,
    pub(crate) indices: Box<[usize]>,
}

impl<'a> Segments<&'a str> {
    /// Splits `text` into phrases with `delimiter`, then every phrase into whitespace-separated
    /// tokens. Empty phrases are dropped, so every phrase holds at least one token.
    pub(crate) fn parse(text: &'a str, delimiter: Delimiter) -> Self {
        let mut tokens = Vec::new();
        let mut indices = vec![0];
        for phrase in delimiter.split(text) {
            tokens.extend(phrase.split_whitespace());
            indices.push(tokens.len());
        }
        Self {
            tokens: tokens.into_boxed_slice(),
            indices: indices.into_boxed_slice(),
        }
    }
}

impl<T> Segments<T> {
    /// Number of tokens, all phrases included.
    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }
    pub(crate) fn phrase_count(&self) -> usize {
        self.indices.len().saturating_sub(1)
    }
}

#[cfg(test)]
impl<T> From<Vec<Vec<T>>> for Segments<T> {
    fn from(value: Vec<Vec<T>>) -> Self {
        let length: usize = value.iter().map(|v| v.len()).sum();
        let mut flattened = Vec::with_capacity(length);
        let mut indices = Vec::with_capacity(value.len() + 1);
        indices.push(0);
        for vec in value.into_iter() {
            flattened.extend(vec);
            indices.push(flattened.len());
        }
        Self {
            tokens: flattened.into_boxed_slice(),
            indices: indices.into_boxed_slice(),
        }
    }
}

impl<'a, T> Segments<T> {
    /// Iterates over the tokens, ignoring the phrase boundaries.
    pub(crate) fn iter(&'a self) -> Iter<'a, T> {
        self.tokens.iter()
    }
    /// Iterates over the phrases, each one being the slice of its tokens.
    pub(crate) fn iter_vec(&'a self) -> VecsIter<'a, T> {
        VecsIter::new(self)
    }
}

pub(crate) struct VecsIter<'a, T>
where
    T: 'a,
{
    indice_index: usize,
    segments: &'a Segments<T>,
}

impl<'a, T> VecsIter<'a, T> {
    fn new(segments: &'a Segments<T>) -> Self {
        Self {
            indice_index: 0,
            segments,
        }
    }
}

impl<'a, T> Iterator for VecsIter<'a, T> {
    type Item = &'a [T];
    fn next(&mut self) -> Option<Self::Item> {
        let start = *self.segments.indices.get(self.indice_index)?;
        let end = *self.segments.indices.get(self.indice_index + 1)?;
        self.indice_index += 1;
        self.segments.tokens.get(start..end)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .segments
            .phrase_count()
            .saturating_sub(self.indice_index);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for VecsIter<'_, T> {}

/// This method allocates. It should only be used in the testing environment.
#[cfg(test)]
impl<T> From<Segments<T>> for Vec<Vec<T>>
where
    T: Clone,
{
    fn from(value: Segments<T>) -> Self {
        value.iter_vec().map(Vec::from).collect()
    }
}
