/// How indices outside `[0, len)` are resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum BorderMode<T> {
    /// Outside samples take the given value; [`map_index`] returns `None`.
    Constant(T),
    /// Mirror around the edge samples without repeating them (`dcb|abcd|cba`).
    Reflect101,
    /// Cyclic (toroidal) continuation: index `len` maps back to `0`.
    Wrap,
}

pub fn map_index<T>(i: isize, len: usize, mode: &BorderMode<T>) -> Option<usize> {
    if len == 0 {
        return None;
    }

    match mode {
        BorderMode::Constant(_) => (i >= 0 && (i as usize) < len).then_some(i as usize),
        BorderMode::Reflect101 => {
            if len == 1 {
                return Some(0);
            }

            let period = (2 * len - 2) as isize;
            let r = i.rem_euclid(period) as usize;
            if r < len {
                Some(r)
            } else {
                Some((2 * len - 2) - r)
            }
        }
        BorderMode::Wrap => Some(i.rem_euclid(len as isize) as usize),
    }
}
