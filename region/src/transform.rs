use crate::{common::*, Point, Rect};

/// An axis-aligned scale-and-translate transform on pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn from_rects(src: &Rect<T>, tgt: &Rect<T>) -> Self {
        let sy = tgt.h() / src.h();
        let sx = tgt.w() / src.w();
        let ty = tgt.t() - src.t() * sy;
        let tx = tgt.l() - src.l() * sx;

        Self { sy, sx, ty, tx }
    }

    /// The transform mapping a `[h, w]` frame onto another frame,
    /// anchored at the origin.
    pub fn from_sizes_exact(src_hw: [T; 2], tgt_hw: [T; 2]) -> Self {
        let zero = T::zero();
        let [src_h, src_w] = src_hw;
        let [tgt_h, tgt_w] = tgt_hw;
        let src = Rect::from_tlhw([zero, zero, src_h, src_w]);
        let tgt = Rect::from_tlhw([zero, zero, tgt_h, tgt_w]);
        Self::from_rects(&src, &tgt)
    }
}

impl<T> Mul<&Rect<T>> for &Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    type Output = Rect<T>;

    fn mul(self, rhs: &Rect<T>) -> Self::Output {
        rhs.transform(self)
    }
}

impl<T> Mul<&Point<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = Point<T>;

    fn mul(self, rhs: &Point<T>) -> Self::Output {
        rhs.transform(self)
    }
}
