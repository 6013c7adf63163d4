//! Color functions.

use std::collections::HashMap;

use super::BuiltinFn;
use crate::color::Color;
use crate::error::SassResult;
use crate::eval::{CallArgs, Evaluator};
use crate::value::{Number, QuoteKind, Value};

pub(crate) fn register(m: &mut HashMap<&'static str, BuiltinFn>) {
    m.insert("rgb", rgb);
    m.insert("rgba", rgb);
    m.insert("hsl", hsl);
    m.insert("hsla", hsl);
    m.insert("red", red);
    m.insert("green", green);
    m.insert("blue", blue);
    m.insert("hue", hue);
    m.insert("saturation", saturation);
    m.insert("lightness", lightness);
    m.insert("alpha", alpha);
    m.insert("opacity", alpha);
    m.insert("mix", mix);
    m.insert("lighten", lighten);
    m.insert("darken", darken);
    m.insert("saturate", saturate);
    m.insert("desaturate", desaturate);
    m.insert("adjust-hue", adjust_hue);
    m.insert("grayscale", grayscale);
    m.insert("complement", complement);
    m.insert("invert", invert);
    m.insert("adjust-color", adjust_color);
    m.insert("change-color", change_color);
    m.insert("scale-color", scale_color);
    m.insert("opacify", opacify);
    m.insert("fade-in", opacify);
    m.insert("transparentize", transparentize);
    m.insert("fade-out", transparentize);
    m.insert("ie-hex-str", ie_hex_str);
}

/// A channel argument: plain number or percentage of 255.
fn channel(args: &CallArgs, value: &Value) -> SassResult<f64> {
    match value {
        Value::Number(n) => {
            if n.numer == vec!["%".to_string()] {
                Ok(n.value * 255.0 / 100.0)
            } else {
                Ok(n.value)
            }
        }
        other => Err(args.type_error("channel", "a number", other)),
    }
}

/// An alpha argument: 0–1, or a percentage.
fn alpha_value(args: &CallArgs, value: &Value) -> SassResult<f64> {
    match value {
        Value::Number(n) => {
            if n.numer == vec!["%".to_string()] {
                Ok(n.value / 100.0)
            } else {
                Ok(n.value)
            }
        }
        other => Err(args.type_error("alpha", "a number", other)),
    }
}

fn rgb(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(4)?;
    // `rgb($color, $alpha)` adjusts an existing color's alpha.
    if args.len() == 2 {
        if let Some(Value::Color(c)) = args.take(0, "color") {
            let a = args.take_required(1, "alpha")?;
            let a = alpha_value(&args, &a)?;
            return Ok(Value::Color(c.with_alpha(a)));
        }
    }
    let r = args.take_required(0, "red")?;
    let g = args.take_required(1, "green")?;
    let b = args.take_required(2, "blue")?;
    let a = match args.take(3, "alpha") {
        Some(v) => alpha_value(&args, &v)?,
        None => 1.0,
    };
    Ok(Value::Color(Color::new_rgba(
        channel(&args, &r)?,
        channel(&args, &g)?,
        channel(&args, &b)?,
        a,
    )))
}

fn hsl(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(4)?;
    let h = args.take_number(0, "hue")?;
    let s = args.take_number(1, "saturation")?;
    let l = args.take_number(2, "lightness")?;
    let a = match args.take(3, "alpha") {
        Some(v) => alpha_value(&args, &v)?,
        None => 1.0,
    };
    Ok(Value::Color(Color::new_hsla(h.value, s.value, l.value, a)))
}

fn component(
    mut args: CallArgs,
    unit: Option<&str>,
    f: impl Fn(&Color) -> f64,
) -> SassResult<Value> {
    args.max_args(1)?;
    let c = args.take_color(0, "color")?;
    let value = f(&c);
    Ok(Value::Number(match unit {
        Some(u) => Number::with_unit(value, u),
        None => Number::new(value),
    }))
}

fn red(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    component(args, None, |c| c.red().round())
}

fn green(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    component(args, None, |c| c.green().round())
}

fn blue(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    component(args, None, |c| c.blue().round())
}

fn hue(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    component(args, Some("deg"), Color::hue)
}

fn saturation(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    component(args, Some("%"), Color::saturation)
}

fn lightness(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    component(args, Some("%"), Color::lightness)
}

fn alpha(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let c = args.take_color(0, "color")?;
    Ok(Value::Number(Number::new(c.alpha())))
}

fn mix(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(3)?;
    let c1 = args.take_color(0, "color1")?;
    let c2 = args.take_color(1, "color2")?;
    let weight = match args.take(2, "weight") {
        Some(Value::Number(n)) => n.value / 100.0,
        Some(other) => return Err(args.type_error("weight", "a number", &other)),
        None => 0.5,
    };
    Ok(Value::Color(mix_colors(&c1, &c2, weight)))
}

pub(crate) fn mix_colors(c1: &Color, c2: &Color, p: f64) -> Color {
    let w = p * 2.0 - 1.0;
    let a = c1.alpha() - c2.alpha();
    let w1 = if w * a == -1.0 {
        w
    } else {
        (w + a) / (1.0 + w * a)
    };
    let w1 = (w1 + 1.0) / 2.0;
    let w2 = 1.0 - w1;
    Color::new_rgba(
        c1.red() * w1 + c2.red() * w2,
        c1.green() * w1 + c2.green() * w2,
        c1.blue() * w1 + c2.blue() * w2,
        c1.alpha() * p + c2.alpha() * (1.0 - p),
    )
}

fn hsl_adjust(
    mut args: CallArgs,
    f: impl Fn(f64, f64, f64, f64, f64) -> Color,
) -> SassResult<Value> {
    args.max_args(2)?;
    let c = args.take_color(0, "color")?;
    let amount = args.take_number(1, "amount")?;
    Ok(Value::Color(f(
        c.hue(),
        c.saturation(),
        c.lightness(),
        c.alpha(),
        amount.value,
    )))
}

fn lighten(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    hsl_adjust(args, |h, s, l, a, amt| {
        Color::new_hsla(h, s, (l + amt).clamp(0.0, 100.0), a)
    })
}

fn darken(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    hsl_adjust(args, |h, s, l, a, amt| {
        Color::new_hsla(h, s, (l - amt).clamp(0.0, 100.0), a)
    })
}

fn saturate(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    hsl_adjust(args, |h, s, l, a, amt| {
        Color::new_hsla(h, (s + amt).clamp(0.0, 100.0), l, a)
    })
}

fn desaturate(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    hsl_adjust(args, |h, s, l, a, amt| {
        Color::new_hsla(h, (s - amt).clamp(0.0, 100.0), l, a)
    })
}

fn adjust_hue(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    hsl_adjust(args, |h, s, l, a, amt| Color::new_hsla(h + amt, s, l, a))
}

fn grayscale(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    match args.take_required(0, "color")? {
        Value::Color(c) => Ok(Value::Color(Color::new_hsla(
            c.hue(),
            0.0,
            c.lightness(),
            c.alpha(),
        ))),
        // `grayscale(50%)` is the CSS filter function.
        Value::Number(n) => Ok(Value::String(
            format!("grayscale({})", Value::Number(n).inspect(10)),
            QuoteKind::None,
        )),
        other => Err(args.type_error("color", "a color", &other)),
    }
}

fn complement(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let c = args.take_color(0, "color")?;
    Ok(Value::Color(Color::new_hsla(
        c.hue() + 180.0,
        c.saturation(),
        c.lightness(),
        c.alpha(),
    )))
}

fn invert(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    match args.take_required(0, "color")? {
        Value::Color(c) => {
            let weight = match args.take(1, "weight") {
                Some(Value::Number(n)) => n.value / 100.0,
                Some(other) => return Err(args.type_error("weight", "a number", &other)),
                None => 1.0,
            };
            let inverted = Color::new_rgba(
                255.0 - c.red(),
                255.0 - c.green(),
                255.0 - c.blue(),
                c.alpha(),
            );
            Ok(Value::Color(mix_colors(&inverted, &c, weight)))
        }
        Value::Number(n) => Ok(Value::String(
            format!("invert({})", Value::Number(n).inspect(10)),
            QuoteKind::None,
        )),
        other => Err(args.type_error("color", "a color", &other)),
    }
}

/// Shared plumbing for `adjust-color`/`change-color`/`scale-color`.
#[derive(Clone, Copy, PartialEq)]
enum ColorChange {
    Adjust,
    Change,
    Scale,
}

fn color_change(mut args: CallArgs, mode: ColorChange) -> SassResult<Value> {
    let c = args.take_color(0, "color")?;

    let mut take = |name: &str| -> SassResult<Option<f64>> {
        match args.take(usize::MAX, name) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n.value)),
            Some(other) => Err(args.type_error(name, "a number", &other)),
        }
    };

    let red = take("red")?;
    let green = take("green")?;
    let blue = take("blue")?;
    let hue = take("hue")?;
    let saturation = take("saturation")?;
    let lightness = take("lightness")?;
    let alpha = take("alpha")?;
    args.assert_no_leftovers()?;

    let has_rgb = red.is_some() || green.is_some() || blue.is_some();
    let has_hsl = hue.is_some() || saturation.is_some() || lightness.is_some();
    if has_rgb && has_hsl {
        return Err(args.error("RGB parameters may not be passed along with HSL parameters"));
    }
    if mode == ColorChange::Scale && hue.is_some() {
        return Err(args.error("$hue may not be scaled"));
    }

    let apply = |current: f64, change: Option<f64>, max: f64| -> f64 {
        match change {
            None => current,
            Some(v) => match mode {
                ColorChange::Adjust => current + v,
                ColorChange::Change => v,
                ColorChange::Scale => {
                    let p = v / 100.0;
                    if p > 0.0 {
                        current + (max - current) * p
                    } else {
                        current + current * p
                    }
                }
            },
        }
    };

    let new_alpha = apply(c.alpha(), alpha, 1.0).clamp(0.0, 1.0);
    if has_hsl {
        let new_hue = match (mode, hue) {
            (ColorChange::Adjust, Some(h)) => c.hue() + h,
            (ColorChange::Change, Some(h)) => h,
            _ => c.hue(),
        };
        Ok(Value::Color(Color::new_hsla(
            new_hue,
            apply(c.saturation(), saturation, 100.0).clamp(0.0, 100.0),
            apply(c.lightness(), lightness, 100.0).clamp(0.0, 100.0),
            new_alpha,
        )))
    } else {
        Ok(Value::Color(Color::new_rgba(
            apply(c.red(), red, 255.0),
            apply(c.green(), green, 255.0),
            apply(c.blue(), blue, 255.0),
            new_alpha,
        )))
    }
}

fn adjust_color(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    color_change(args, ColorChange::Adjust)
}

fn change_color(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    color_change(args, ColorChange::Change)
}

fn scale_color(args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    color_change(args, ColorChange::Scale)
}

fn opacify(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let c = args.take_color(0, "color")?;
    let amount = args.take_number(1, "amount")?;
    Ok(Value::Color(c.with_alpha(c.alpha() + amount.value)))
}

fn transparentize(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(2)?;
    let c = args.take_color(0, "color")?;
    let amount = args.take_number(1, "amount")?;
    Ok(Value::Color(c.with_alpha(c.alpha() - amount.value)))
}

fn ie_hex_str(mut args: CallArgs, _: &mut Evaluator) -> SassResult<Value> {
    args.max_args(1)?;
    let c = args.take_color(0, "color")?;
    Ok(Value::String(c.ie_hex_str(), QuoteKind::None))
}
