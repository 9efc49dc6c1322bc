//! Advance widths of the standard Type1 fonts, in thousandths of an em, as
//! published in their AFM files. Covers printable ASCII plus the WinAnsi
//! punctuation the PDF writer can encode.

pub(crate) struct FontMetrics {
    ascii: [u16; 95],
    /// quoteleft, quoteright, quotedblleft, quotedblright, bullet, endash, emdash
    punctuation: [u16; 7],
}

impl FontMetrics {
    pub(crate) fn advance(&self, c: char) -> u16 {
        match c {
            ' '..='~' => self.ascii[c as usize - 0x20],
            '\u{2018}' => self.punctuation[0],
            '\u{2019}' => self.punctuation[1],
            '\u{201C}' => self.punctuation[2],
            '\u{201D}' => self.punctuation[3],
            '\u{2022}' => self.punctuation[4],
            '\u{2013}' => self.punctuation[5],
            '\u{2014}' => self.punctuation[6],
            '\u{A0}' => self.advance(' '),
            // Latin-1 letters are close to their unaccented lowercase forms.
            '\u{A1}'..='\u{FF}' => self.advance('o'),
            // Encoded as `?`.
            _ => self.advance('?'),
        }
    }
}

pub(crate) static COURIER: FontMetrics = FontMetrics {
    ascii: [600; 95],
    punctuation: [600; 7],
};

/// Times-Roman.
pub(crate) static TIMES_ROMAN: FontMetrics = FontMetrics {
    ascii: [
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564,
        250, 333, 250, 278, 500, 500, 500, 500, 500, 500, 500, 500,
        500, 500, 278, 278, 564, 564, 564, 444, 921, 722, 667, 667,
        722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
        556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333,
        278, 333, 469, 500, 333, 444, 500, 444, 500, 444, 333, 500,
        500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
        278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
    ],
    punctuation: [333, 333, 444, 444, 350, 500, 1000],
};

/// Times-Bold.
pub(crate) static TIMES_BOLD: FontMetrics = FontMetrics {
    ascii: [
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570,
        250, 333, 250, 278, 500, 500, 500, 500, 500, 500, 500, 500,
        500, 500, 333, 333, 570, 570, 570, 500, 930, 722, 667, 722,
        722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
        611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333,
        278, 333, 581, 500, 333, 500, 556, 444, 556, 444, 333, 500,
        556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444, 389,
        333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
    ],
    punctuation: [333, 333, 500, 500, 350, 500, 1000],
};

/// Times-Italic.
pub(crate) static TIMES_ITALIC: FontMetrics = FontMetrics {
    ascii: [
        250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675,
        250, 333, 250, 278, 500, 500, 500, 500, 500, 500, 500, 500,
        500, 500, 333, 333, 675, 675, 675, 500, 920, 611, 611, 667,
        722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
        611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389,
        278, 389, 422, 500, 333, 500, 500, 444, 500, 444, 278, 500,
        500, 278, 278, 444, 278, 722, 500, 500, 500, 500, 389, 389,
        278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
    ],
    punctuation: [333, 333, 556, 556, 350, 500, 889],
};

/// Times-BoldItalic.
pub(crate) static TIMES_BOLD_ITALIC: FontMetrics = FontMetrics {
    ascii: [
        250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570,
        250, 333, 250, 278, 500, 500, 500, 500, 500, 500, 500, 500,
        500, 500, 333, 333, 570, 570, 570, 500, 832, 667, 667, 667,
        722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
        611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333,
        278, 333, 570, 500, 333, 500, 500, 444, 500, 444, 333, 500,
        556, 278, 278, 500, 278, 778, 556, 500, 500, 500, 389, 389,
        278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
    ],
    punctuation: [333, 333, 500, 500, 350, 500, 1000],
};

/// Helvetica and Helvetica-Oblique.
pub(crate) static HELVETICA: FontMetrics = FontMetrics {
    ascii: [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584,
        278, 333, 278, 278, 556, 556, 556, 556, 556, 556, 556, 556,
        556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
        722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278,
        278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
        556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
        278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
    ],
    punctuation: [222, 222, 333, 333, 350, 556, 1000],
};

/// Helvetica-Bold and Helvetica-BoldOblique.
pub(crate) static HELVETICA_BOLD: FontMetrics = FontMetrics {
    ascii: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584,
        278, 333, 278, 278, 556, 556, 556, 556, 556, 556, 556, 556,
        556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
        722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333,
        278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
        611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
        333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ],
    punctuation: [278, 278, 500, 500, 350, 556, 1000],
};
