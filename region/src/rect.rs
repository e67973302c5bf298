use crate::{common::*, Point, Transform};

/// An axis-aligned rectangle in TLBR format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> Rect<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn try_from_tlbr(tlbr: [T; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");
        Ok(Self { t, l, b, r })
    }

    pub fn try_from_tlhw(tlhw: [T; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let b = t + h;
        let r = l + w;
        Self::try_from_tlbr([t, l, b, r])
    }

    pub fn from_tlbr(tlbr: [T; 4]) -> Self {
        Self::try_from_tlbr(tlbr).unwrap()
    }

    pub fn from_tlhw(tlhw: [T; 4]) -> Self {
        Self::try_from_tlhw(tlhw).unwrap()
    }

    pub fn t(&self) -> T {
        self.t
    }

    pub fn l(&self) -> T {
        self.l
    }

    pub fn b(&self) -> T {
        self.b
    }

    pub fn r(&self) -> T {
        self.r
    }

    pub fn h(&self) -> T {
        self.b - self.t
    }

    pub fn w(&self) -> T {
        self.r - self.l
    }

    pub fn cy(&self) -> T {
        let two = T::one() + T::one();
        self.t + self.h() / two
    }

    pub fn cx(&self) -> T {
        let two = T::one() + T::one();
        self.l + self.w() / two
    }

    pub fn center(&self) -> Point<T> {
        Point::new(self.cx(), self.cy())
    }

    pub fn area(&self) -> T {
        self.h() * self.w()
    }

    pub fn tlbr(&self) -> [T; 4] {
        [self.t, self.l, self.b, self.r]
    }

    pub fn transform(&self, transform: &Transform<T>) -> Self {
        Rect {
            t: self.t * transform.sy + transform.ty,
            l: self.l * transform.sx + transform.tx,
            b: self.b * transform.sy + transform.ty,
            r: self.r * transform.sx + transform.tx,
        }
    }
}
